pub mod attendance;
pub mod employee;
pub mod planning;
pub mod presence_sheet;
pub mod role;
