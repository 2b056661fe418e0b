use crate::common::function::FunctionCode;
use crate::common::traits::{Loggable, Serialize};
use crate::decode::AppDecodeLevel;
use crate::error::RequestError;
use crate::types::UnitId;

use scursor::ReadCursor;

pub(crate) mod read_registers;
pub(crate) mod write_multiple;
pub(crate) mod write_single;

/// A request that knows how to frame itself and how to validate the response body
pub(crate) trait RequestDetails: Serialize + Loggable {
    type Response;

    fn function(&self) -> FunctionCode;

    fn unit_id(&self) -> UnitId;

    fn parse_response(
        &self,
        cursor: &mut ReadCursor,
        decode: AppDecodeLevel,
    ) -> Result<Self::Response, RequestError>;
}
