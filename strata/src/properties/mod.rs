//! Properties of providers that the rewrite passes reason about.
//!
//! [`OrderSpec`] is the declared order of a header. [`OrderingDescriptor`] classifies how an
//! operator kind interacts with the order of its sources; it is not stored on providers but
//! looked up through a [`DescriptorResolver`].

mod order;
pub use order::*;
mod descriptor;
pub use descriptor::*;

/// A property which can be required by a consumer and provided by a producer.
pub trait PhysicalProp {
    /// Tests whether `self` satisfies `required`.
    fn satisfies(&self, required: &Self) -> bool;
}
