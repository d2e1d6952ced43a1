use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::task::{BASS, DynRun};

/// Interface for providing inputs into the graph, such as a lifted value
pub trait Input: Send + Sync {
    fn read(&self) -> BASS;
}

/// Unique values representing a task in a Graph.  Ids are random so graphs built
/// independently can be merged without coordinating on a shared counter.
#[derive(Debug,Clone,PartialEq,Eq,Hash)]
pub struct Handle {
    name: String,
    id: Uuid
}

impl Handle {
    fn new(name: &str) -> Self {
        Handle { name: name.to_owned(), id: Uuid::new_v4() }
    }

    /// Stage name this task was registered under
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let id = self.id.simple().to_string();
        write!(f, "{}#{}", self.name, &id[..8])
    }
}

/// ADT for handling either Tasks or reading data into the graph
pub enum Task {

    /// Node which consumes down stream data to produce new data
    Function(Box<dyn DynRun>),

    /// Node which generates data
    Input(Box<dyn Input>)
}

/// Holds references to the number of arguments to pass into a Task
#[derive(Debug,Clone)]
pub enum FnArgs {

    /// Single argument
    Single(Arc<Handle>),

    /// Used for joining two separate task outputs
    Join(Arc<Handle>, Arc<Handle>)
}

impl FnArgs {
    /// Handles this task reads from
    pub fn handles(&self) -> Vec<&Arc<Handle>> {
        match self {
            FnArgs::Single(h) => vec![h],
            FnArgs::Join(l, r) => vec![l, r]
        }
    }
}

/// Graphs contain the computational pieces needed to represent the data flow
/// between multiple different tasks, their combination, and eventual output.
#[derive(Clone,Default)]
pub struct Graph {

    /// Output handle to task
    pub tasks: HashMap<Arc<Handle>, Arc<Task>>,

    /// Dependencies between tasks
    pub dependencies: HashMap<Arc<Handle>, Option<Arc<FnArgs>>>
}

impl Graph {

    /// Creates a new Graph
    pub fn new() -> Self {
        Graph::default()
    }

    /// Number of tasks in the graph
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the graph has no tasks at all
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Adds a new input into the Graph
    pub fn add_input<I: Input + 'static>(&mut self, input: I, name: &str) -> Arc<Handle> {
        let handle = Arc::new(Handle::new(name));
        self.dependencies.insert(handle.clone(), None);
        self.tasks.insert(handle.clone(), Arc::new(Task::Input(Box::new(input))));
        handle
    }

    /// Adds a task to the graph with the given inputs.  No effort is made to ensure the
    /// handles exist within the graph.
    pub fn add_task<D: 'static + DynRun>(&mut self, inputs: FnArgs, t: D, name: &str) -> Arc<Handle> {
        let handle = Arc::new(Handle::new(name));
        self.dependencies.insert(handle.clone(), Some(Arc::new(inputs)));
        self.tasks.insert(handle.clone(), Arc::new(Task::Function(Box::new(t))));
        handle
    }

    /// Given two graphs, merge all tasks and dependencies.
    pub fn merge(&self, other: &Graph) -> Graph {
        let mut merged = self.clone();
        for (handle, input) in other.dependencies.iter() {
            merged.dependencies.entry(handle.clone()).or_insert_with(|| input.clone());
        }

        for (handle, task) in other.tasks.iter() {
            merged.tasks.entry(handle.clone()).or_insert_with(|| task.clone());
        }
        merged
    }
}

#[cfg(test)]
mod graph_test {
    use super::*;
    use crate::task::DynFn;

    struct Constant(usize);

    impl Input for Constant {
        fn read(&self) -> BASS {
            Box::new(self.0)
        }
    }

    #[test]
    fn test_merge_keeps_shared_tasks_once() {
        let mut g1 = Graph::new();
        let input = g1.add_input(Constant(1), "Constant");
        let mut g2 = g1.clone();
        g1.add_task(FnArgs::Single(input.clone()), DynFn::new(|x: &usize| x + 1), "Inc");
        g2.add_task(FnArgs::Single(input), DynFn::new(|x: &usize| x * 2), "Double");

        let merged = g1.merge(&g2);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.dependencies.len(), 3);
    }

    #[test]
    fn test_handle_display_uses_stage_name() {
        let mut g = Graph::new();
        let h = g.add_input(Constant(1), "ReadText");
        assert_eq!(h.name(), "ReadText");
        assert!(h.to_string().starts_with("ReadText#"));
    }
}
