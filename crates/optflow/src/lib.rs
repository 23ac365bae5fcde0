#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use optflow_image as image;

#[doc(inline)]
pub use optflow_imgproc as imgproc;

#[doc(inline)]
pub use optflow_io as io;

#[doc(inline)]
pub use optflow_motion as motion;
