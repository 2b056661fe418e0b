//! Command-line Modbus RTU master

use std::num::ParseIntError;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use mbrtu::client::{RtuMaster, SessionConfig};
use mbrtu::*;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("{0}")]
    Request(#[from] RequestError),
    #[error("unable to parse integer: {0}")]
    BadInt(#[from] ParseIntError),
}

#[derive(Parser)]
#[command(name = "mbrtu-client")]
#[command(about = "A command line program for making Modbus RTU master requests using the mbrtu crate")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Path of the serial port (e.g. /dev/ttyUSB0 or COM3)")]
    port: String,

    #[arg(short = 't', long, default_value = "1000", help = "Response timeout in milliseconds")]
    timeout_ms: u64,

    #[arg(short = 'i', long, default_value = "1", help = "The address of the Modbus slave")]
    id: u8,

    #[arg(short = 'c', long, default_value = "<", value_parser = parse_crc_order, help = "CRC byte order, '<' (little endian) or '>' (big endian)")]
    crc_order: CrcByteOrder,

    #[arg(short = 'b', long, default_value = "9600", help = "Baud rate")]
    baud: u32,

    #[arg(long, default_value = "n", value_parser = parse_parity, help = "Parity, one of n, e, o")]
    parity: Parity,

    #[arg(long, default_value = "1", value_parser = parse_stop_bits, help = "Number of stop bits, 1 or 2")]
    stop_bits: StopBits,

    #[arg(long, default_value = "nothing", value_parser = parse_frame_decode, help = "RTU frame decoding, one of nothing, header, payload")]
    frame_decode: FrameDecodeLevel,

    #[arg(long, default_value = "nothing", value_parser = parse_phys_decode, help = "Serial link decoding, one of nothing, length, data")]
    phys_decode: PhysDecodeLevel,

    #[arg(short = 'p', long, help = "Optional polling period in milliseconds")]
    period: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(name = "rhr", about = "read holding registers")]
    ReadHoldingRegisters(ReadArgs),

    #[command(name = "wsr", about = "write single register")]
    WriteSingleRegister(WriteSingleRegisterArgs),

    #[command(name = "wmr", about = "write multiple registers")]
    WriteMultipleRegisters(WriteMultipleRegistersArgs),

    #[command(name = "nwmr", about = "write multiple registers without waiting for the acknowledgment")]
    WriteMultipleRegistersNoReply(WriteMultipleRegistersArgs),
}

#[derive(Args)]
struct ReadArgs {
    #[arg(short = 's', long, help = "the starting address")]
    start: u16,

    #[arg(short = 'q', long, help = "quantity of values")]
    quantity: u16,
}

#[derive(Args)]
struct WriteSingleRegisterArgs {
    #[arg(short = 'i', long, help = "the address of the register")]
    index: u16,

    #[arg(short = 'v', long, help = "the value of the register")]
    value: u16,
}

#[derive(Args)]
struct WriteMultipleRegistersArgs {
    #[arg(short = 's', long, help = "the starting address of the registers")]
    start: u16,

    #[arg(short = 'v', long, help = "the values of the registers specified as a comma delimited list (e.g. 1,4,7)")]
    values: String,
}

fn parse_crc_order(value: &str) -> Result<CrcByteOrder, InvalidRequest> {
    value.parse()
}

fn parse_parity(value: &str) -> Result<Parity, InvalidRequest> {
    value.parse()
}

fn parse_stop_bits(value: &str) -> Result<StopBits, InvalidRequest> {
    value.parse()
}

fn parse_frame_decode(value: &str) -> Result<FrameDecodeLevel, String> {
    match value {
        "nothing" => Ok(FrameDecodeLevel::Nothing),
        "header" => Ok(FrameDecodeLevel::Header),
        "payload" => Ok(FrameDecodeLevel::Payload),
        _ => Err(format!("unknown frame decode level: {value}")),
    }
}

fn parse_phys_decode(value: &str) -> Result<PhysDecodeLevel, String> {
    match value {
        "nothing" => Ok(PhysDecodeLevel::Nothing),
        "length" => Ok(PhysDecodeLevel::Length),
        "data" => Ok(PhysDecodeLevel::Data),
        _ => Err(format!("unknown physical decode level: {value}")),
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    if let Err(ref e) = run().await {
        println!("error: {e}");
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = SerialConfig::fixed(cli.port.as_str(), Duration::from_millis(cli.timeout_ms))
        .with_baud_rate(cli.baud)
        .with_parity(cli.parity)
        .with_stop_bits(cli.stop_bits);

    let decode = DecodeLevel::nothing()
        .application(AppDecodeLevel::DataValues)
        .frame(cli.frame_decode)
        .physical(cli.phys_decode);
    let master = RtuMaster::with_config(SessionConfig::default().with_decode(decode));
    master.open_with(config).await?;

    let result = match cli.period {
        None => run_command(&cli, &master).await,
        Some(period_ms) => {
            let period = Duration::from_millis(period_ms);
            loop {
                if let Err(err) = run_command(&cli, &master).await {
                    break Err(err);
                }
                tokio::time::sleep(period).await
            }
        }
    };

    master.close().await?;
    result.map_err(Into::into)
}

async fn run_command(cli: &Cli, master: &RtuMaster) -> Result<(), Error> {
    match &cli.command {
        Command::ReadHoldingRegisters(args) => {
            let values = master
                .read_holding_registers(cli.id, args.start, args.quantity, cli.crc_order)
                .await?;
            for (index, value) in (args.start..).zip(values) {
                println!("index: {index} value: {value}")
            }
        }
        Command::WriteSingleRegister(args) => {
            master
                .write_single_register(args.value, cli.id, args.index, cli.crc_order)
                .await?;
        }
        Command::WriteMultipleRegisters(args) => {
            let values = parse_register_values(&args.values)?;
            master
                .write_multi_registers(cli.id, args.start, &values, cli.crc_order)
                .await?;
        }
        Command::WriteMultipleRegistersNoReply(args) => {
            let values = parse_register_values(&args.values)?;
            master
                .nr_write_multi_registers(cli.id, args.start, &values, cli.crc_order)
                .await?;
        }
    }
    Ok(())
}

fn parse_register_values(values_str: &str) -> Result<Vec<u16>, Error> {
    let mut values: Vec<u16> = Vec::new();
    for value in values_str.split(',') {
        values.push(value.trim().parse()?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_delimited_registers() {
        assert_eq!(parse_register_values("1, 4,7").unwrap(), vec![1, 4, 7]);
        assert!(matches!(
            parse_register_values("1,x"),
            Err(Error::BadInt(_))
        ));
    }

    #[test]
    fn parses_link_flags() {
        let cli = Cli::try_parse_from([
            "mbrtu-client",
            "--port",
            "/dev/ttyUSB0",
            "--crc-order",
            ">",
            "--parity",
            "e",
            "--stop-bits",
            "2",
            "rhr",
            "-s",
            "0",
            "-q",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.crc_order, CrcByteOrder::BigEndian);
        assert_eq!(cli.parity, Parity::Even);
        assert_eq!(cli.stop_bits, StopBits::Two);
        assert_eq!(cli.baud, 9600);
        assert_eq!(cli.frame_decode, FrameDecodeLevel::Nothing);
        assert!(matches!(cli.command, Command::ReadHoldingRegisters(_)));
    }

    #[test]
    fn parses_decode_levels() {
        let cli = Cli::try_parse_from([
            "mbrtu-client",
            "--port",
            "COM3",
            "--frame-decode",
            "payload",
            "--phys-decode",
            "length",
            "nwmr",
            "-s",
            "0",
            "-v",
            "1,2",
        ])
        .unwrap();
        assert_eq!(cli.frame_decode, FrameDecodeLevel::Payload);
        assert_eq!(cli.phys_decode, PhysDecodeLevel::Length);
        assert!(parse_phys_decode("verbose").is_err());
    }

    #[test]
    fn rejects_unknown_crc_order() {
        assert!(Cli::try_parse_from([
            "mbrtu-client",
            "--port",
            "COM3",
            "--crc-order",
            "=",
            "wsr",
            "-i",
            "1",
            "-v",
            "2",
        ])
        .is_err());
    }
}
