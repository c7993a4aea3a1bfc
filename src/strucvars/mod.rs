//! Code for structural variant (CNV) related sub commands.

pub mod collapse;
