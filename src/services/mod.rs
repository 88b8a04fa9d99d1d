//! Services module - Qt discovery and tool launching logic.
//!
//! Everything in here is **framework-agnostic**: no CLI or terminal code, all
//! inputs are explicit parameters, and every filesystem check goes through the
//! async [`FileProbe`] trait.
//!
//! # Components
//!
//! - [`platform`]: the single OS naming-policy table ([`HostOs`], [`Tool`],
//!   candidate filenames, `.app` bundle rewrite)
//! - [`path_probe`]: [`FileProbe`] with real ([`FsProbe`]) and in-memory
//!   ([`MemoryProbe`]) implementations, plus [`find_first_existing`]
//! - [`cmake_cache`]: [`CMakeCache`] reader for `CMakeCache.txt`
//! - [`qt_root`]: [`QtRootResolver`] chaining configured root, cache hint and `PATH`
//! - [`tool_locator`]: [`ToolLocator`] finding Designer/Assistant/Creator and
//!   validating launch requests
//! - [`launcher`]: [`ProcessSpawner`] and the detached [`TokioSpawner`]
//! - [`watcher`]: [`FileWatcher`] feeding [`Trigger`]s into the resolve queue
//! - [`natvis`], [`docs`]: debugger visualizer generation and documentation URLs
//!
//! # Resolution flow
//!
//! 1. Read `CMakeCache.txt` from the configured build directory
//! 2. Pick the first `Qt5_DIR`/`Qt5Core_DIR`/`Qt6_DIR`/`Qt6Core_DIR` hint
//! 3. Walk up from the hint until `bin/qmake` exists, else scan `PATH`
//! 4. Search `<root>/bin` and the extra directories for the requested tool

pub mod cmake_cache;
pub mod docs;
pub mod launcher;
pub mod natvis;
pub mod path_probe;
pub mod platform;
pub mod qt_root;
pub mod tool_locator;
pub mod watcher;

pub use cmake_cache::{CMAKE_CACHE_FILENAME, CMakeCache, CacheStore, QtDirHint, QtVersionFamily};
pub use launcher::{ProcessSpawner, SharedSpawner, SpawnedTool, TokioSpawner};
pub use path_probe::{FileProbe, FsProbe, MemoryProbe, find_first_existing};
pub use platform::{HostOs, Tool};
pub use qt_root::{QtRoot, QtRootResolver, Resolution, ResolveInputs, RootSource};
pub use tool_locator::{LaunchError, ToolLocator, ToolTarget};
pub use watcher::{FileWatcher, Trigger};
