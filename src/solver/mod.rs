pub mod algorithm;
pub mod arc;
pub mod arcs;
pub mod choicepoint;
pub mod constraint;
pub mod constraints;
pub mod domain;
pub mod expression;
pub mod graph;
pub mod node;
pub mod queue;
pub mod stats;
pub mod store;
