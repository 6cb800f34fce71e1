pub mod gotrue;
pub mod postgrest;
pub mod supabase;

pub use gotrue::SupabaseAuthAdapter;
pub use postgrest::SupabaseTodoAdapter;
pub use supabase::SupabaseEndpoint;
