pub mod ads;
