use std::any::Any;
use std::marker::PhantomData;

pub type BASS = Box<dyn Any + Send + Sync>;

pub enum DynArgs<'a> {
    One(&'a BASS),
    Two(&'a BASS, &'a BASS)
}

/// Why a single evaluation of a task did not produce a value
#[derive(Debug, Clone, PartialEq)]
pub enum TaskError {
    /// Arguments did not downcast into the types the task was built for.  Retrying
    /// won't help.
    TypeMismatch,

    /// The task function itself reported a failure
    Failed(String)
}

pub trait DynRun: Send + Sync {
    fn eval(&self, val: DynArgs) -> Result<BASS, TaskError>;
}

pub struct DynFn<A,B,F: Fn(&A) -> B>(F,PhantomData<A>,PhantomData<B>);

impl <A,B,F: Fn(&A) -> B> DynFn<A,B,F> {
    pub fn new(f: F) -> Self {
        DynFn(f, PhantomData, PhantomData)
    }
}

impl <A: Any + Send + Sync, B: Any + Send + Sync, F: Send + Sync + Fn(&A) -> B> DynRun for DynFn<A,B,F> {

    fn eval(&self, val: DynArgs) -> Result<BASS, TaskError> {
        match val {
            DynArgs::One(v) => {
                let a = v.downcast_ref::<A>().ok_or(TaskError::TypeMismatch)?;
                let bx: BASS = Box::new(self.0(a));
                Ok(bx)
            },
            _ => Err(TaskError::TypeMismatch)
        }
    }
}

/// Like DynFn, but the wrapped function can fail.  Failures are reported to the scheduler,
/// which decides whether to run the task again.
pub struct DynTryFn<A,B,F: Fn(&A) -> Result<B,String>>(F,PhantomData<A>,PhantomData<B>);

impl <A,B,F: Fn(&A) -> Result<B,String>> DynTryFn<A,B,F> {
    pub fn new(f: F) -> Self {
        DynTryFn(f, PhantomData, PhantomData)
    }
}

impl <A: Any + Send + Sync, B: Any + Send + Sync, F: Send + Sync + Fn(&A) -> Result<B,String>> DynRun for DynTryFn<A,B,F> {

    fn eval(&self, val: DynArgs) -> Result<BASS, TaskError> {
        match val {
            DynArgs::One(v) => {
                let a = v.downcast_ref::<A>().ok_or(TaskError::TypeMismatch)?;
                let b = self.0(a).map_err(TaskError::Failed)?;
                let bx: BASS = Box::new(b);
                Ok(bx)
            },
            _ => Err(TaskError::TypeMismatch)
        }
    }
}

pub struct DynFn2<A,B,C,F: Fn(&A, &B) -> C>(F,PhantomData<A>,PhantomData<B>,PhantomData<C>);

impl <A,B,C,F: Fn(&A, &B) -> C> DynFn2<A,B,C,F> {
    pub fn new(f: F) -> Self {
        DynFn2(f, PhantomData, PhantomData, PhantomData)
    }
}

impl <A: Any + Send + Sync, B: Any + Send + Sync, C: Any + Send + Sync, F: Send + Sync + Fn(&A, &B) -> C> DynRun for DynFn2<A,B,C,F> {

    fn eval(&self, val: DynArgs) -> Result<BASS, TaskError> {
        match val {
            DynArgs::Two(a, b) => {
                let a = a.downcast_ref::<A>().ok_or(TaskError::TypeMismatch)?;
                let b = b.downcast_ref::<B>().ok_or(TaskError::TypeMismatch)?;
                let cx: BASS = Box::new(self.0(a, b));
                Ok(cx)
            },
            _ => Err(TaskError::TypeMismatch)
        }
    }
}
