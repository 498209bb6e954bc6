//! Contains logic for mapping between the flat (NAF) and nested (FoLiA) representations.

pub mod folia_to_naf;
pub mod naf_to_folia;
