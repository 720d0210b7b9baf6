//! Integration tests for the layout snapshot engine

mod archive_round_trip;
mod folder_emission;
mod metadata_naming;
mod mutation_rebuild;
mod support;
