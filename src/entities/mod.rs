pub mod follow;
pub mod theater;
pub mod user;
pub mod viewing_record;
pub mod wishlist;
