pub mod error;
pub mod supabase;

pub use error::DbError;
pub use supabase::SupabaseClient;
