//! `ExplicitReversal` and `DynamicTransform` (§4.2.1 rows 10-11): the two
//! escape hatches — pairing an unrelated forward/reverse transformation,
//! and a user closure driving a small effect context.

use super::{Status, TransformWork, Transformation};
use crate::error::{CopybaraError, Result};

/// `ExplicitReversal(forward, reverse)` (§4.2.1): always reversible, since
/// the reverse branch is supplied directly rather than derived.
#[derive(Debug)]
pub struct ExplicitReversal {
   forward: Box<dyn Transformation>,
   reverse: Box<dyn Transformation>,
}

impl ExplicitReversal {
   pub fn new(forward: Box<dyn Transformation>, reverse: Box<dyn Transformation>) -> Self {
      Self { forward, reverse }
   }
}

impl Transformation for ExplicitReversal {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      self.forward.transform(work)
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      Ok(Box::new(ExplicitReversal { forward: self.reverse.clone_box()?, reverse: self.forward.clone_box()? }))
   }

   fn describe(&self) -> String {
      format!("ExplicitReversal(forward={}, reverse={})", self.forward.describe(), self.reverse.describe())
   }
}

/// Helper used by `ExplicitReversal::reverse` to avoid requiring every
/// `Transformation` impl to derive `Clone` (trait objects can't); any
/// transformation that only needs to be reversed, not duplicated in place,
/// can rely on its own `reverse()` to produce an equivalent value instead.
trait CloneBox {
   fn clone_box(&self) -> Result<Box<dyn Transformation>>;
}

impl CloneBox for Box<dyn Transformation> {
   fn clone_box(&self) -> Result<Box<dyn Transformation>> {
      // Reversing twice yields a transformation equivalent to the
      // original for every primitive in this pipeline (Move/Replace/etc.
      // are involutive under double reversal), which is what a "copy of
      // self" needs to mean here.
      let once = self.reverse()?;
      once.reverse()
   }
}

/// Effect context handed to a `DynamicTransform` closure (§4.2.1): the
/// closure may call `success`/`noop`/`fail_with_noop`, or mutate
/// `work.message`/the tree directly and fall through to the implicit
/// success.
pub struct DynamicContext<'w, 'a> {
   pub work: &'w mut TransformWork<'a>,
   label: String,
   outcome: Option<Result<Status>>,
}

impl<'w, 'a> DynamicContext<'w, 'a> {
   fn new(work: &'w mut TransformWork<'a>, label: impl Into<String>) -> Self {
      Self { work, label: label.into(), outcome: None }
   }

   pub fn success(&mut self) {
      self.outcome = Some(Ok(Status::Success));
   }

   /// The closure has nothing to do, but the *script itself* isn't wrong;
   /// the pipeline should treat this step as a no-op and move on.
   pub fn noop(&mut self, reason: impl Into<String>) {
      self.outcome = Some(Ok(Status::Noop(reason.into())));
   }

   /// The closure determined this step can never succeed on this tree;
   /// unlike `noop`, this propagates as a hard `VoidOperation` failure
   /// (§4.2.3's `FAIL_IF_ANY_NOOP` path), not a `Status::Noop` the caller
   /// can silently ignore.
   pub fn fail_with_noop(&mut self) {
      self.outcome = Some(Err(CopybaraError::void_operation(self.label.clone())));
   }

   pub fn run(&mut self, other: &dyn Transformation) -> Result<Status> {
      other.transform(self.work)
   }
}

/// `DynamicTransform(script)` (§4.2.1): a user closure with no return value
/// implicitly succeeds; only reversible when wrapped in `ExplicitReversal`.
pub struct DynamicTransform {
   script: Box<dyn Fn(&mut DynamicContext) -> Result<()> + Send + Sync>,
   label: String,
}

impl DynamicTransform {
   pub fn new(label: impl Into<String>, script: impl Fn(&mut DynamicContext) -> Result<()> + Send + Sync + 'static) -> Self {
      Self { script: Box::new(script), label: label.into() }
   }
}

impl std::fmt::Debug for DynamicTransform {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("DynamicTransform").field("label", &self.label).finish()
   }
}

impl Transformation for DynamicTransform {
   fn transform(&self, work: &mut TransformWork) -> Result<Status> {
      let mut ctx = DynamicContext::new(work, self.label.clone());
      (self.script)(&mut ctx)?;
      ctx.outcome.unwrap_or(Ok(Status::Success))
   }

   fn reverse(&self) -> Result<Box<dyn Transformation>> {
      Err(crate::error::CopybaraError::non_reversible(self.describe(), "DynamicTransform only reverses via ExplicitReversal"))
   }

   fn describe(&self) -> String {
      format!("DynamicTransform({})", self.label)
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::console::Console;

   #[derive(Debug)]
   struct AlwaysSuccess;
   impl Transformation for AlwaysSuccess {
      fn transform(&self, _work: &mut TransformWork) -> Result<Status> {
         Ok(Status::Success)
      }
      fn reverse(&self) -> Result<Box<dyn Transformation>> {
         Ok(Box::new(AlwaysSuccess))
      }
      fn describe(&self) -> String {
         "AlwaysSuccess".to_string()
      }
   }

   #[derive(Debug)]
   struct AlwaysNoop;
   impl Transformation for AlwaysNoop {
      fn transform(&self, _work: &mut TransformWork) -> Result<Status> {
         Ok(Status::Noop("always".to_string()))
      }
      fn reverse(&self) -> Result<Box<dyn Transformation>> {
         Ok(Box::new(AlwaysNoop))
      }
      fn describe(&self) -> String {
         "AlwaysNoop".to_string()
      }
   }

   #[test]
   fn explicit_reversal_runs_forward_on_transform() {
      let mut console = Console::null();
      let mut work = TransformWork::new(std::env::temp_dir(), &mut console);
      let er = ExplicitReversal::new(Box::new(AlwaysSuccess), Box::new(AlwaysNoop));
      assert_eq!(er.transform(&mut work).expect("ok"), Status::Success);
   }

   #[test]
   fn explicit_reversal_runs_reverse_branch_on_reverse_then_transform() {
      let mut console = Console::null();
      let mut work = TransformWork::new(std::env::temp_dir(), &mut console);
      let er = ExplicitReversal::new(Box::new(AlwaysSuccess), Box::new(AlwaysNoop));
      let reversed = er.reverse().expect("reverse");
      assert!(reversed.transform(&mut work).expect("ok").is_noop());
   }

   #[test]
   fn dynamic_transform_defaults_to_success_with_no_explicit_outcome() {
      let mut console = Console::null();
      let mut work = TransformWork::new(std::env::temp_dir(), &mut console);
      let dt = DynamicTransform::new("noop-script", |_ctx| Ok(()));
      assert_eq!(dt.transform(&mut work).expect("ok"), Status::Success);
   }

   #[test]
   fn dynamic_transform_honors_explicit_noop_call() {
      let mut console = Console::null();
      let mut work = TransformWork::new(std::env::temp_dir(), &mut console);
      let dt = DynamicTransform::new("noop-script", |ctx| {
         ctx.noop("nothing to do");
         Ok(())
      });
      assert!(dt.transform(&mut work).expect("ok").is_noop());
   }

   #[test]
   fn dynamic_transform_fail_with_noop_raises_void_operation() {
      let mut console = Console::null();
      let mut work = TransformWork::new(std::env::temp_dir(), &mut console);
      let dt = DynamicTransform::new("doomed-script", |ctx| {
         ctx.fail_with_noop();
         Ok(())
      });
      assert!(matches!(dt.transform(&mut work), Err(crate::error::CopybaraError::VoidOperation { .. })));
   }

   #[test]
   fn dynamic_transform_is_not_reversible_without_explicit_reversal() {
      let dt = DynamicTransform::new("x", |_ctx| Ok(()));
      assert!(dt.reverse().is_err());
   }
}
