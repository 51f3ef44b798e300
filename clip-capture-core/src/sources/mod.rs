pub mod replay_source;
