use crate::triplet::{Linkage, Triplet};
use anyhow::Result;

pub fn execute(linkage: Linkage) -> Result<i32> {
    println!("{}", Triplet::host()?.tag(linkage));
    Ok(0)
}
