pub mod caller;
pub mod error;
pub mod io;
pub mod pairs;
pub mod rle;
pub mod segment;
pub mod table;
pub mod toy;
pub mod track;
pub mod window;
pub mod xdrop;

pub use error::IbdError;
