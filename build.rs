//! Build script for Tessera.
//!
//! Currently a no-op placeholder. The lease wire types are implemented
//! directly in Rust (see src/adapters/grpc/) rather than generated from
//! protobuf definitions.
//!
//! This approach was chosen because:
//! - It avoids proto file dependencies and build-time codegen complexity
//! - The lease API surface is three unary RPCs and six small messages
//!
//! If proto-based codegen is needed in the future, tonic-build can be
//! configured here to compile proto files from a `proto/` directory.

fn main() {
    // Rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
