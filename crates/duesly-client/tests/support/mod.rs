pub mod duesly_testkit;
