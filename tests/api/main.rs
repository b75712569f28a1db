mod seed;
mod stations;
