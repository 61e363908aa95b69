pub mod comments;
pub mod destinations;
pub mod organization;
pub mod proposals;
pub mod share;
pub mod tours;
