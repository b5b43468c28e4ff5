//! SeaORM entities for the user registry: countries, cities, users and
//! issued login tokens, plus thin helpers for the queries the service needs.

pub mod errors;
pub mod db;
pub mod country;
pub mod city;
pub mod user;
pub mod auth_token;

#[cfg(test)]
mod tests;
