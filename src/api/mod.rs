pub mod attendance;
pub mod planning;
pub mod presence_sheet;
