// Entity Models
//
// Each entity has a stable UUID identity and is persisted by `db`.
// The breeding engine only ever reads these as snapshots.

pub mod animal;
pub mod pairing;
pub mod clutch;

pub use animal::{Animal, AnimalStatus, NewAnimal, Sex, WeightRecord};
pub use pairing::{FollicleCheck, Pairing, PairingMale, PairingStatus};
pub use clutch::{Clutch, NewClutch};
