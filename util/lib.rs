/*!
This crate contains small utilities shared by the other bakeoff crates: a fixed-size [`ThreadPool`](thread_pool/struct.ThreadPool.html) whose `execute` blocks until every task has produced its result, and the [`Finite`](finite/struct.Finite.html) wrapper for floats that are known to be neither NaN nor infinite.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod finite;
pub mod thread_pool;
