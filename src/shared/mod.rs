pub mod db;
pub mod error;
pub mod schema;
pub mod state;
#[cfg(test)]
pub mod test_util;
