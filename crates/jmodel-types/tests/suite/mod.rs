mod forward_refs;
mod immutability;
mod merge;
mod resolve;
mod super_types;
mod type_var_scoping;
mod writer;
