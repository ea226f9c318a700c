//! Genomes are the focus of evolution.
//! They are a collection of node and link genes that can be
//! decoded into a phenotype (typically a neural network).
//! New genomes are built by the [`GeneticsFactory`], or derived
//! from existing ones by the [operators](crate::operators);
//! a genome's genes are never edited once it exists.
mod config;
mod errors;
mod factory;
mod fields;
mod gene_map;
mod genome;
mod links;
mod nodes;

pub use config::GeneticConfig;
pub(crate) use errors::check_probability;
pub use errors::{ConfigError, GeneMapError};
pub use factory::GeneticsFactory;
pub use fields::{FieldConfig, FieldRange, FieldSpec, FieldValue, Fields, ACTIVATION, WEIGHT};
pub use gene_map::GeneMap;
pub use genome::Genome;
pub use links::LinkGene;
pub use nodes::{NodeGene, NodeKind};
