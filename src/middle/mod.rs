//! Middle module - register allocation shared by the analyzer and backend

pub mod regalloc;
