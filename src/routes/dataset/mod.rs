mod handler;
mod model;

pub use handler::{clear_cache, despesas, receitas};
pub use model::{DESPESAS, Dataset, DatasetQuery, RECEITAS};
