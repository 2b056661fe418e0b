pub(crate) mod function;
pub(crate) mod traits;

pub(crate) mod buffer;
pub(crate) mod cursor;
pub(crate) mod phys;
