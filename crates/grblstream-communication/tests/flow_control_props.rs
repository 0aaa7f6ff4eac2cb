use grblstream_communication::{FlowControlConfig, FlowControlTracker};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Send(String),
    Ack,
    Fault,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => "[A-Z0-9 .]{1,60}".prop_map(Op::Send),
        1 => Just(Op::Ack),
        1 => Just(Op::Fault),
    ]
}

proptest! {
    #[test]
    fn prop_admitted_bytes_never_exceed_usable(ops in prop::collection::vec(op(), 1..200)) {
        let config = FlowControlConfig::default();
        let mut tracker = FlowControlTracker::new(config);
        let mut model: std::collections::VecDeque<usize> = Default::default();

        for op in ops {
            match op {
                Op::Send(command) => {
                    if tracker.can_send(&command) {
                        let was_empty = tracker.is_empty();
                        tracker.record_sent(&command);
                        model.push_back(command.len() + 1);
                        if !was_empty {
                            prop_assert!(tracker.used_bytes() <= config.usable());
                        }
                    }
                }
                Op::Ack => {
                    let released = tracker.on_acknowledge().map(|c| c.footprint());
                    prop_assert_eq!(released, model.pop_front());
                }
                Op::Fault => {
                    let released = tracker.on_fault().map(|c| c.footprint());
                    prop_assert_eq!(released, model.pop_front());
                }
            }

            prop_assert_eq!(tracker.used_bytes(), model.iter().sum::<usize>());
            prop_assert_eq!(tracker.outstanding_len(), model.len());
        }
    }

    #[test]
    fn prop_empty_tracker_always_admits(command in "[A-Z0-9 .]{1,300}", capacity in 2usize..200) {
        let tracker = FlowControlTracker::new(FlowControlConfig { capacity, margin: 1 });
        prop_assert!(tracker.can_send(&command));
    }
}
