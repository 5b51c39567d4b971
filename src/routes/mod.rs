// # Routes Module
//
// - HTTP route handlers for the travel assistant.
//
//  ## Available Route Modules
// - `health`: Health check endpoint
// - `query`: Landing page and the free-text travel query endpoint

/// Health check and monitoring endpoints
pub mod health;

/// Landing page and travel query endpoints
pub mod query;
