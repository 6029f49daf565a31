pub mod logistics_grid;
pub mod simple_golf;
