pub mod basis;
pub mod dof_handler;
pub mod equations;
pub mod finite_element;
pub mod geometric;
pub mod mesh;
