use crate::common::cursor::WriteCursor;
use crate::decode::AppDecodeLevel;
use crate::error::RequestError;

pub(crate) trait Serialize {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError>;
}

pub(crate) trait Loggable {
    fn log(&self, level: AppDecodeLevel, f: &mut std::fmt::Formatter) -> std::fmt::Result;
}

pub(crate) struct LoggableDisplay<'a, T: Loggable> {
    loggable: &'a T,
    level: AppDecodeLevel,
}

impl<'a, T: Loggable> LoggableDisplay<'a, T> {
    pub(crate) fn new(loggable: &'a T, level: AppDecodeLevel) -> Self {
        Self { loggable, level }
    }
}

impl<T: Loggable> std::fmt::Display for LoggableDisplay<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.loggable.log(self.level, f)
    }
}
