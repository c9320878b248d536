pub mod rowkey_tests;
pub mod totals_tests;
