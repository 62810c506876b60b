pub mod attachment;
pub mod controller;
pub mod draft;
pub mod handlers;
pub mod lookups;
pub mod registry;
pub mod state;
pub mod steps;
pub mod submission;
pub mod validation;
