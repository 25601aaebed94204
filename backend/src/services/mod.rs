pub mod activity_logs;
pub mod auth;
pub mod background_jobs;
pub mod challenges;
pub mod family_members;
pub mod leaderboards;
pub mod member_locks;
pub mod statistics;
pub mod streaks;
