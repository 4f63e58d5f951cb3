#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod device_list;
pub mod error;
pub mod inventory;
pub mod traits;
pub mod types;
