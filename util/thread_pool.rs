use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A `ThreadPool` owns a fixed number of worker threads. Tasks passed to `execute` are distributed round robin over the workers, and `execute` does not return until every task has finished.
pub struct ThreadPool {
	threads: Vec<Thread>,
}

impl ThreadPool {
	pub fn new(size: usize) -> ThreadPool {
		let size = size.max(1);
		ThreadPool {
			threads: (0..size).map(|_| Thread::new()).collect(),
		}
	}

	pub fn size(&self) -> usize {
		self.threads.len()
	}

	/**
	Run each task in `tasks` on the pool and block until all of them have completed. The output of the task at index `i` is written to slot `i` of the returned `Vec`, regardless of the order in which the tasks finish. A task that panics yields `Err` with the panic payload in its slot and does not affect any other task.
	*/
	pub fn execute<'s, F, R>(&self, tasks: Vec<F>) -> Vec<std::thread::Result<R>>
	where
		F: FnOnce() -> R + Send + 's,
		R: Send + 's,
	{
		let n_threads = self.threads.len();
		let mut slots = Vec::with_capacity(tasks.len());
		for (index, task) in tasks.into_iter().enumerate() {
			let (slot_sender, slot_receiver) = bounded::<std::thread::Result<R>>(1);
			let f: Box<dyn FnOnce() + Send + 's> = Box::new(move || {
				let output = catch_unwind(AssertUnwindSafe(task));
				slot_sender.send(output).ok();
			});
			// This is safe because this function blocks until every slot receiver has either received a value or observed that its sender was dropped, which happens only after the task has run or been discarded.
			let f = unsafe {
				std::mem::transmute::<Box<dyn FnOnce() + Send + 's>, Box<dyn FnOnce() + Send + 'static>>(
					f,
				)
			};
			self.threads[index % n_threads].spawn(f);
			slots.push(slot_receiver);
		}
		slots
			.into_iter()
			.map(|slot_receiver| match slot_receiver.recv() {
				Ok(output) => output,
				Err(_) => Err(Box::new("worker thread exited before completing the task")
					as Box<dyn std::any::Any + Send>),
			})
			.collect()
	}
}

#[derive(Debug)]
struct Thread {
	task_sender: Option<Sender<Task>>,
	join_handle: Option<std::thread::JoinHandle<()>>,
}

type Task = Box<dyn FnOnce() + Send + 'static>;

impl Thread {
	fn new() -> Thread {
		let (task_sender, task_receiver) = unbounded::<Task>();
		let join_handle = std::thread::spawn(move || run(task_receiver));
		Thread {
			join_handle: Some(join_handle),
			task_sender: Some(task_sender),
		}
	}

	fn spawn(&self, f: Task) {
		if let Some(task_sender) = self.task_sender.as_ref() {
			// If the worker is gone the task comes back inside the error and is dropped here, which disconnects its slot.
			task_sender.send(f).ok();
		}
	}
}

fn run(task_receiver: Receiver<Task>) {
	while let Ok(task) = task_receiver.recv() {
		task();
	}
}

impl Drop for Thread {
	fn drop(&mut self) {
		self.task_sender.take();
		if let Some(join_handle) = self.join_handle.take() {
			join_handle.join().ok();
		}
	}
}

#[test]
fn test_results_are_written_to_their_slots() {
	let pool = ThreadPool::new(3);
	let inputs = vec![5u64, 1, 4, 2, 3];
	let tasks: Vec<_> = inputs
		.iter()
		.map(|input| {
			move || {
				std::thread::sleep(std::time::Duration::from_millis(*input * 5));
				input * 10
			}
		})
		.collect();
	let outputs: Vec<u64> = pool
		.execute(tasks)
		.into_iter()
		.map(|output| output.unwrap())
		.collect();
	assert_eq!(outputs, vec![50, 10, 40, 20, 30]);
}

#[test]
fn test_panicking_task_is_isolated() {
	let pool = ThreadPool::new(2);
	let tasks: Vec<Box<dyn FnOnce() -> usize + Send>> = vec![
		Box::new(|| 1),
		Box::new(|| panic!("boom")),
		Box::new(|| 3),
	];
	let outputs = pool.execute(tasks);
	assert_eq!(*outputs[0].as_ref().unwrap(), 1);
	assert!(outputs[1].is_err());
	assert_eq!(*outputs[2].as_ref().unwrap(), 3);
	// The pool is still usable after a task panicked.
	let outputs = pool.execute(vec![|| 7]);
	assert_eq!(*outputs[0].as_ref().unwrap(), 7);
}
