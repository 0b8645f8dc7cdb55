pub mod arithmetic;
pub mod native;
pub mod time_value;
