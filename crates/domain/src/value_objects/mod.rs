pub mod character_pack;
pub mod declarations;
pub mod results;
pub mod review;
