mod provisioning_behaviour;
