use state_machines::state_machine;

state_machine! {
    name: AnswerMachine,
    state: AnswerState,
    initial: Ready,
    states: [Ready, Retrieved, Prompted, Escalated, Answered],
    events {
        retrieve { transition: { from: Ready, to: Retrieved } }
        compose { transition: { from: Retrieved, to: Prompted } }
        escalate { transition: { from: Prompted, to: Escalated } }
        settle {
            transition: { from: Prompted, to: Answered }
            transition: { from: Escalated, to: Answered }
        }
    }
}

pub fn ready() -> AnswerMachine<(), Ready> {
    AnswerMachine::new(())
}
