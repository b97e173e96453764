pub mod db_utils;
pub mod error;
pub mod money;
pub mod pagination;

#[cfg(test)]
pub(crate) mod test_support;
