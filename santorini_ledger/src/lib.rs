// santorini_ledger — reference in-memory move ledger.
//
// Implements `santorini_protocol::MoveLedger` entirely in process so that
// clients, tests, and local hot-seat games can run without a remote
// backend. Behaves like a real ledger from the client's point of view:
// conditional appends, push notifications that may be lost, and transport
// failures, the last two on demand through fault injection.
//
// Module overview:
// - `memory.rs`: `MemoryLedger`: per-match append-only logs behind a
//   `Mutex`, with subscriber broadcast and fault injection.

pub mod memory;

pub use memory::MemoryLedger;
