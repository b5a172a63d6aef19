pub mod summary_cache;
