// Native image pipeline boundary: commands out, progress/complete events back.

pub mod bridge;
pub mod descriptor;
pub mod emitter;
pub mod events;
pub mod pump;
pub mod traits;
