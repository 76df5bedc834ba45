pub mod parcel {
    include!(concat!(env!("OUT_DIR"), "/parcel.rs"));
}

pub use parcel::*;

pub use prost;
