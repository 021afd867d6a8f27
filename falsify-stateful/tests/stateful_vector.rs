//! Model-based testing of a vector system: linear replay and the
//! concurrent runner over the same action set.

use std::sync::Arc;

use falsify::{Generator, arbitrary, just, one_of};
use falsify_stateful::{
    Action, ActionRef, action_lists, concurrency_with_model, stateful_property,
};

#[derive(Debug, Clone, Default)]
struct VecModel {
    size: usize,
}

#[derive(Debug)]
struct PushBack(i32);

#[derive(Debug)]
struct PopBack;

#[derive(Debug)]
struct Clear;

impl Action<Vec<i32>, VecModel> for PushBack {
    fn run(&self, system: &mut Vec<i32>, model: &mut VecModel) -> bool {
        system.push(self.0);
        model.size += 1;
        model.size == system.len()
    }
}

impl Action<Vec<i32>, VecModel> for PopBack {
    fn precondition(&self, system: &Vec<i32>, _model: &VecModel) -> bool {
        !system.is_empty()
    }

    fn run(&self, system: &mut Vec<i32>, model: &mut VecModel) -> bool {
        system.pop();
        model.size -= 1;
        model.size == system.len()
    }
}

impl Action<Vec<i32>, VecModel> for Clear {
    fn run(&self, system: &mut Vec<i32>, model: &mut VecModel) -> bool {
        system.clear();
        model.size = 0;
        model.size == system.len()
    }
}

fn vector_actions() -> falsify::GenBoxed<ActionRef<Vec<i32>, VecModel>> {
    let pushes = arbitrary::<i32>()
        .map(|value: &i32| Arc::new(PushBack(*value)) as ActionRef<Vec<i32>, VecModel>);
    one_of(vec![
        pushes.boxed(),
        just(Arc::new(PopBack) as ActionRef<Vec<i32>, VecModel>).boxed(),
        just(Arc::new(Clear) as ActionRef<Vec<i32>, VecModel>).boxed(),
    ])
    .boxed()
}

#[test]
fn model_size_tracks_system_size() {
    // S5: model.size == system.len() after every enabled action
    let outcome = stateful_property(
        arbitrary::<Vec<i32>>().boxed(),
        |system: &Vec<i32>| VecModel {
            size: system.len(),
        },
        action_lists(vector_actions()).with_size_range(0, 50).boxed(),
    )
    .seed(100)
    .iterations(200)
    .run();
    assert!(outcome.is_ok());
}

#[test]
fn buggy_systems_are_caught_and_shrunk() {
    // a "pop" that forgets to update the model
    #[derive(Debug)]
    struct ForgetfulPop;

    impl Action<Vec<i32>, VecModel> for ForgetfulPop {
        fn precondition(&self, system: &Vec<i32>, _model: &VecModel) -> bool {
            !system.is_empty()
        }

        fn run(&self, system: &mut Vec<i32>, model: &mut VecModel) -> bool {
            system.pop();
            model.size == system.len()
        }
    }

    let actions = one_of(vec![
        arbitrary::<i32>()
            .map(|value: &i32| Arc::new(PushBack(*value)) as ActionRef<Vec<i32>, VecModel>)
            .boxed(),
        just(Arc::new(ForgetfulPop) as ActionRef<Vec<i32>, VecModel>).boxed(),
    ]);
    let outcome = stateful_property(
        just(vec![1i32]).boxed(),
        |system: &Vec<i32>| VecModel {
            size: system.len(),
        },
        action_lists(actions.boxed()).with_size_range(0, 30).boxed(),
    )
    .seed(101)
    .run();
    let failure = outcome.expect_err("the forgetful pop must be caught");
    let (_, sequence) = failure.shrunk.expect("shrunk sequence recorded");
    // one enabled pop is enough to expose the bug
    assert!(!sequence.is_empty());
}

#[test]
fn concurrent_vector_keeps_model_agreement() {
    let runner = concurrency_with_model(
        just(Vec::<i32>::new()).boxed(),
        |system: &Vec<i32>| VecModel {
            size: system.len(),
        },
        action_lists(vector_actions()).with_size_range(0, 8).boxed(),
    )
    .seed(102)
    .iterations(50);
    let ok = runner.go_with(|system, model| {
        falsify::prop_assert_eq!(model.size, system.len());
    });
    assert!(ok);
}
