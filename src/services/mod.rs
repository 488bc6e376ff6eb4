pub mod export;
pub mod matching;
pub mod order_service;
pub mod reconcile;
