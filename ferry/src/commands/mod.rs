pub mod fetch;
pub mod keys;
pub mod push;
pub mod run;
pub mod send;
